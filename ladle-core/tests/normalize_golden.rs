use ladle_core::{ContentNormalizer, HtmlNormalizer};

const BASE_URL: &str = "https://kitchen.test/recipes/easy-tomato-soup";

#[test]
fn tomato_soup_page() {
    let html = include_str!("fixtures/tomato_soup.html");
    let expected = include_str!("fixtures/tomato_soup.txt");

    let text = HtmlNormalizer::new().normalize(html, BASE_URL);

    assert_eq!(text, expected.trim_end());
}

#[test]
fn normalization_is_deterministic() {
    let html = include_str!("fixtures/tomato_soup.html");
    let normalizer = HtmlNormalizer::new();
    assert_eq!(
        normalizer.normalize(html, BASE_URL),
        normalizer.normalize(html, BASE_URL)
    );
}
