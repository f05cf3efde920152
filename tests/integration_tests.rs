//! Integration tests for the strix browser emulation library
//!
//! These tests drive whole pages end to end: parse, script, interact,
//! observe.

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use strix::{Browser, BrowserVersion, By, Driver};

fn browser() -> Browser {
    let _ = env_logger::builder().is_test(true).try_init();
    Browser::default()
}

#[test]
fn test_page_load_and_visible_text() {
    let browser = browser();
    let page = browser
        .load_html(concat!(
            "<html><head><title>Shop</title><style>.hint { display: none }</style></head>",
            "<body><h1>Catalog</h1>",
            "<p class=\"hint\">internal note</p>",
            "<table><tr><td>Widget</td><td>9.99</td></tr>",
            "<tr><td>Gadget</td><td>24.50</td></tr></table>",
            "</body></html>",
        ))
        .unwrap();

    assert_eq!(page.title(), "Shop");
    assert_eq!(
        page.visible_text(),
        "Catalog\nWidget\t9.99\nGadget\t24.50"
    );
}

#[test]
fn test_script_modifies_page_before_read() {
    let browser = browser();
    let page = browser
        .load_html(concat!(
            "<body><ul id=\"list\"></ul>",
            "<script>",
            "var list = document.getElementById('list');",
            "['a', 'b', 'c'].forEach(function(item) {",
            "  var li = document.createElement('li');",
            "  li.textContent = item;",
            "  list.appendChild(li);",
            "});",
            "</script></body>",
        ))
        .unwrap();

    assert_eq!(page.visible_text(), "a\nb\nc");
}

#[test]
fn test_form_fill_and_submit_through_driver() {
    let browser = browser();
    let page = browser
        .load_html_with_url(
            concat!(
                "<form action=\"/login\" method=\"post\">",
                "<input name=\"user\"><input type=\"password\" name=\"pass\">",
                "<input type=\"submit\" id=\"go\" name=\"go\" value=\"Sign in\">",
                "</form>",
            ),
            "http://example.com/login",
        )
        .unwrap();
    let mut driver = Driver::new(page);

    let user = driver.find(&By::name("user")).unwrap();
    let pass = driver.find(&By::name("pass")).unwrap();
    driver.type_text(user, "alice").unwrap();
    driver.type_text(pass, "s3cret").unwrap();
    driver.click(driver.find(&By::id("go")).unwrap()).unwrap();

    let submissions = driver.page().submissions();
    assert_eq!(submissions.len(), 1);
    assert_eq!(submissions[0].action, "http://example.com/login");
    assert_eq!(
        submissions[0].body.as_deref(),
        Some("user=alice&pass=s3cret&go=Sign+in")
    );
}

#[test]
fn test_click_handler_rewrites_dom() {
    let browser = browser();
    let page = browser
        .load_html(concat!(
            "<div id=\"status\">waiting</div>",
            "<button id=\"b\">Go</button>",
            "<script>",
            "document.getElementById('b').addEventListener('click', function() {",
            "  document.getElementById('status').innerHTML = '<b>done</b>';",
            "});",
            "</script>",
        ))
        .unwrap();
    let mut driver = Driver::new(page);

    assert_eq!(driver.page().visible_text(), "waiting\nGo");
    driver.click(driver.find(&By::id("b")).unwrap()).unwrap();
    assert_eq!(driver.page().visible_text(), "done\nGo");
}

#[test]
fn test_link_navigation_recorded_not_followed() {
    let browser = browser();
    let page = browser
        .load_html_with_url(
            "<a href=\"details.html\">More details</a>",
            "http://example.com/products/1",
        )
        .unwrap();
    let mut driver = Driver::new(page);

    let link = driver.find(&By::link_text("More details")).unwrap();
    driver.click(link).unwrap();

    assert_eq!(
        driver.page().navigations(),
        &["http://example.com/products/details.html".to_string()]
    );
    // The page itself is unchanged
    assert_eq!(driver.page().visible_text(), "More details");
}

#[test]
fn test_dialogs_and_console_recorded() {
    let browser = browser();
    let mut page = browser
        .load_html("<script>alert('hello'); console.warn('careful');</script>")
        .unwrap();
    page.set_confirm_answer(false);
    let declined = page.execute_script("confirm('delete everything?')").unwrap();

    assert_eq!(page.alerts(), &["hello".to_string()]);
    assert_eq!(page.confirms(), &["delete everything?".to_string()]);
    assert_eq!(declined, serde_json::json!(false));
    assert_eq!(page.console_messages().len(), 1);
    assert_eq!(page.console_messages()[0].message, "careful");
}

#[test]
fn test_browser_version_switches_user_agent() {
    for (version, marker) in [
        (BrowserVersion::chrome(), "Chrome"),
        (BrowserVersion::firefox(), "Firefox"),
        (BrowserVersion::edge(), "Edg"),
    ] {
        let mut page = Browser::new(version)
            .load_html("<p>x</p>")
            .unwrap();
        let ua = page.execute_script("navigator.userAgent").unwrap();
        assert!(
            ua.as_str().unwrap().contains(marker),
            "user agent should contain {marker}"
        );
    }
}

#[test]
fn test_xpath_identity_stable_across_mutation() {
    let browser = browser();
    let page = browser
        .load_html("<div><p>first</p><p>second</p></div>")
        .unwrap();
    let mut driver = Driver::new(page);

    let second = driver.find_all(&By::tag_name("p")).unwrap()[1];
    let xpath = driver.xpath(second).unwrap();

    // Mutate an unrelated part of the tree; the handle and its xpath
    // lookup must still resolve to the same element
    driver
        .page_mut()
        .execute_script("document.body.appendChild(document.createElement('hr'));")
        .unwrap();
    let again = driver.find(&By::xpath(&xpath)).unwrap();
    assert_eq!(again, second);
    assert_eq!(driver.text(again), "second");
}

#[test]
fn test_malformed_real_world_html() {
    let browser = browser();
    let page = browser
        .load_html(concat!(
            "<table><tr><td>cell",
            "<p>Unclosed <b>nested <i>formatting</b> tags</i>",
            "<div>trailing",
        ))
        .unwrap();
    let text = page.visible_text();
    assert!(text.contains("cell"));
    assert!(text.contains("formatting"));
    assert!(text.contains("trailing"));
}

proptest! {
    /// Parsing arbitrary input must never panic; the HTML5 algorithm
    /// always recovers
    #[test]
    fn test_parse_arbitrary_input_never_panics(s in "\\PC*") {
        let _ = strix::parser::HtmlParser::new().parse(&s);
    }

    /// Visible-text rendering must not panic on whatever tree parsing
    /// produced
    #[test]
    fn test_visible_text_never_panics(s in "<[a-z ]{0,20}>[\\PC]{0,64}</[a-z]{0,10}>") {
        if let Ok(doc) = strix::parser::HtmlParser::new().parse(&s) {
            let _ = strix::text::page_text(&doc);
        }
    }
}
