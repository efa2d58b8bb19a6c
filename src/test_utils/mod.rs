#![allow(missing_docs)]

pub(crate) mod fakes;
pub(crate) mod form;
pub(crate) mod html;
pub(crate) mod http;

pub(crate) use fakes::{FailingStore, StubScorer};
pub(crate) use form::{
    assert_form_error_message, assert_form_textarea, assert_hx_endpoint, must_get_form,
};
pub(crate) use html::{
    assert_valid_html, parse_html_document, parse_html_fragment, select_attributes,
};
pub(crate) use http::{
    assert_content_type, assert_hx_redirect, assert_status_ok, get_header, parse_json_body,
};
