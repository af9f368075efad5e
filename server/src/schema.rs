diesel::table! {
    recipes (id) {
        id -> BigInt,
        owner_id -> BigInt,
        name -> Text,
        ingredients -> Text,
        instructions -> Text,
        image_url -> Nullable<Text>,
        source_url -> Text,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}
