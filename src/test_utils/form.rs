use scraper::{ElementRef, Html, Selector};

#[track_caller]
pub(crate) fn must_get_form(html: &Html) -> ElementRef<'_> {
    html.select(&Selector::parse("form").unwrap())
        .next()
        .expect("No form found")
}

#[track_caller]
pub(crate) fn assert_hx_endpoint(form: &ElementRef<'_>, endpoint: &str, attribute: &str) {
    let hx_post = form
        .value()
        .attr(attribute)
        .unwrap_or_else(|| panic!("{attribute} attribute missing"));

    assert_eq!(
        hx_post, endpoint,
        "want form with attribute {attribute}=\"{endpoint}\", got {hx_post:?}"
    );
}

#[track_caller]
pub(crate) fn assert_form_textarea(form: &ElementRef<'_>, name: &str, value: &str) {
    for textarea in form.select(&Selector::parse("textarea").unwrap()) {
        if textarea.value().attr("name") == Some(name) {
            let got_value = textarea.text().collect::<String>();

            assert!(
                textarea.value().attr("required").is_some(),
                "want textarea with name {name} to have the required attribute but got none"
            );
            assert_eq!(
                got_value, value,
                "want textarea with value {value:?}, got {got_value:?}"
            );

            return;
        }
    }

    panic!("No textarea found with name \"{name}\"");
}

#[track_caller]
pub(crate) fn assert_form_error_message(form: &ElementRef<'_>, want_error_message: &str) {
    let p = Selector::parse("p.text-red-500").unwrap();
    let error_message = form
        .select(&p)
        .next()
        .expect("No error message found")
        .text()
        .collect::<Vec<_>>()
        .join("");
    let got_error_message = error_message.trim();

    assert_eq!(want_error_message, got_error_message);
}
