//! Listing extraction
//!
//! # Invariants under test
//!
//! 1. Cards are found by any configured class, in document order.
//! 2. Positions are 1..N over emitted cards; nameless cards are skipped.
//! 3. Badge classes are tried in order; a missing badge is empty text.
//! 4. Text is tag-stripped, entity-decoded and whitespace-collapsed.
//! 5. Markup without cards yields an empty listing.
//! 6. Implied end tags (`<li>`, `<p>`, table cells) end a card, so cards
//!    written without their end tags are still siblings.
//! 7. Arbitrarily deep nesting neither overflows the stack nor hides cards
//!    that follow it.

use proof_config::ExtractSettings;
use proof_fetch::{extract_listings, ExtractRules, MAX_DEPTH};

const PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <title>Plumbers in Atlanta</title>
  <script>var tpl = '<div class="company-card"><h3>Fake</h3></div>';</script>
</head>
<body>
  <!-- <div class="provider-summary"><h3>Commented Out</h3></div> -->
  <div class="provider-summary featured">
    <h3>  Acme   Plumbing </h3>
    <span class="badge">Best Pick</span>
    <span class="years">9 Years</span>
  </div>
  <section class="company-card">
    <h3><a href="/plumbers/atlanta/bolt">Bolt &amp; Sons<br/>Electric</a></h3>
    <p class='badge'>7&nbsp;Years</p>
  </section>
  <div class="provider-summary">
    <p>No heading in this card</p>
  </div>
  <div class=company-card>
    <h3>O&#39;Neil Roofing</h3>
  </div>
</body>
</html>
"#;

#[test]
fn cards_names_and_badges_in_order() {
    let got = extract_listings(PAGE, &ExtractRules::default());
    let triples: Vec<(u32, &str, &str)> = got
        .iter()
        .map(|e| (e.position, e.raw_name.as_str(), e.raw_badge_text.as_str()))
        .collect();

    assert_eq!(
        triples,
        vec![
            // `years` outranks `badge` even when `badge` comes first
            (1, "Acme Plumbing", "9 Years"),
            (2, "Bolt & Sons Electric", "7 Years"),
            // nameless card skipped, no position consumed
            (3, "O'Neil Roofing", ""),
        ]
    );
}

#[test]
fn page_without_cards_is_empty_listing() {
    let html = "<html><body><h3>Plumbers</h3><p>No results</p></body></html>";
    assert!(extract_listings(html, &ExtractRules::default()).is_empty());
    assert!(extract_listings("", &ExtractRules::default()).is_empty());
}

#[test]
fn custom_rules_from_settings() {
    let settings = ExtractSettings {
        card_classes: vec!["listing".to_string()],
        name_tag: "H2".to_string(),
        badge_classes: vec!["tenure".to_string()],
    };
    let rules = ExtractRules::from(&settings);
    let html = r#"
      <li class="listing"><h2>Delta Drains</h2><em class="tenure">3 Years</em></li>
      <li class="listing"><h2>Echo HVAC</h2></li>
      <div class="company-card"><h3>Ignored</h3></div>
    "#;
    let got = extract_listings(html, &rules);
    assert_eq!(got.len(), 2);
    assert_eq!(got[0].raw_name, "Delta Drains");
    assert_eq!(got[0].raw_badge_text, "3 Years");
    assert_eq!(got[1].raw_badge_text, "");
}

#[test]
fn unclosed_inner_elements_do_not_leak_across_cards() {
    let html = r#"
      <div class="company-card"><h3>First</h3><p>open paragraph</div>
      <div class="company-card"><h3>Second</h3><span class="years">2 Years</span></div>
    "#;
    let got = extract_listings(html, &ExtractRules::default());
    assert_eq!(got.len(), 2);
    assert_eq!(got[0].raw_badge_text, "");
    assert_eq!(got[1].raw_name, "Second");
    assert_eq!(got[1].raw_badge_text, "2 Years");
}

#[test]
fn class_match_is_whole_token() {
    let html = r#"<div class="company-cards"><h3>Nope</h3></div>"#;
    assert!(extract_listings(html, &ExtractRules::default()).is_empty());
}

fn names_and_badges(html: &str, rules: &ExtractRules) -> Vec<(String, String)> {
    extract_listings(html, rules)
        .into_iter()
        .map(|e| (e.raw_name, e.raw_badge_text))
        .collect()
}

#[test]
fn list_items_without_end_tags_are_separate_cards() {
    let html = r#"
      <ul>
        <li class="company-card"><h3>Acme</h3><span class="years">5 Years</span>
        <li class="company-card"><h3>Bolt</h3><span class="years">8 Years</span>
        <li class="company-card"><h3>Core</h3>
      </ul>
    "#;
    assert_eq!(
        names_and_badges(html, &ExtractRules::default()),
        vec![
            ("Acme".to_string(), "5 Years".to_string()),
            ("Bolt".to_string(), "8 Years".to_string()),
            ("Core".to_string(), String::new()),
        ]
    );
}

#[test]
fn nested_list_keeps_its_own_items() {
    // The inner <li> must not close the outer card.
    let html = r#"
      <ul>
        <li class="company-card"><h3>Acme</h3>
          <ul><li>Drains<li>Water heaters</ul>
          <span class="years">5 Years</span>
        <li class="company-card"><h3>Bolt</h3>
      </ul>
    "#;
    assert_eq!(
        names_and_badges(html, &ExtractRules::default()),
        vec![
            ("Acme".to_string(), "5 Years".to_string()),
            ("Bolt".to_string(), String::new()),
        ]
    );
}

#[test]
fn paragraph_cards_are_closed_by_block_starts() {
    let rules = ExtractRules::from(&ExtractSettings {
        card_classes: vec!["listing".to_string()],
        name_tag: "b".to_string(),
        badge_classes: vec!["tenure".to_string()],
    });
    let html = r#"
      <p class="listing"><b>Delta Drains</b> <i class="tenure">3 Years</i>
      <p class="listing"><b>Echo HVAC</b>
      <div class="listing"><b>Fox Roofing</b></div>
    "#;
    assert_eq!(
        names_and_badges(html, &rules),
        vec![
            ("Delta Drains".to_string(), "3 Years".to_string()),
            ("Echo HVAC".to_string(), String::new()),
            ("Fox Roofing".to_string(), String::new()),
        ]
    );
}

#[test]
fn table_rows_without_end_tags_are_separate_cards() {
    let rules = ExtractRules::from(&ExtractSettings {
        card_classes: vec!["row".to_string()],
        name_tag: "th".to_string(),
        badge_classes: vec!["tenure".to_string()],
    });
    let html = r#"
      <table>
        <tr class="row"><th>Gale Pools<td class="tenure">4 Years
        <tr class="row"><th>Hill Fencing<td>n/a
      </table>
    "#;
    assert_eq!(
        names_and_badges(html, &rules),
        vec![
            ("Gale Pools".to_string(), "4 Years".to_string()),
            ("Hill Fencing".to_string(), String::new()),
        ]
    );
}

/// Run on a thread with the stack a tokio worker gets by default.
fn on_small_stack<T: Send + 'static>(f: impl FnOnce() -> T + Send + 'static) -> T {
    std::thread::Builder::new()
        .stack_size(2 * 1024 * 1024)
        .spawn(f)
        .expect("spawn extraction thread")
        .join()
        .expect("extraction thread panicked")
}

#[test]
fn many_unclosed_paragraphs_do_not_overflow() {
    let mut html = String::from(r#"<div class="company-card"><h3>Acme</h3></div>"#);
    html.push_str(&"<p>x".repeat(20_000));

    let got = on_small_stack(move || names_and_badges(&html, &ExtractRules::default()));
    assert_eq!(got, vec![("Acme".to_string(), String::new())]);
}

#[test]
fn deep_nesting_is_flattened_and_later_cards_survive() {
    let mut html = String::from(r#"<div class="company-card"><h3>Acme</h3></div><section>"#);
    html.push_str(&"<span>x".repeat(MAX_DEPTH * 40));
    html.push_str(r#"</section><div class="company-card"><h3>Bolt</h3><span class="years">2 Years</span></div>"#);

    let got = on_small_stack(move || names_and_badges(&html, &ExtractRules::default()));
    assert_eq!(
        got,
        vec![
            ("Acme".to_string(), String::new()),
            ("Bolt".to_string(), "2 Years".to_string()),
        ]
    );
}
