pub(crate) mod fallback;
pub(crate) mod font;
pub(crate) mod glyph;
pub(crate) mod layout;

#[cfg(test)]
#[path = "../../tests/unit/text/support.rs"]
pub(crate) mod test_support;
