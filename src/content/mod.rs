pub(crate) mod builder;
pub(crate) mod color;
pub(crate) mod manifest;
pub(crate) mod model;
pub(crate) mod settings;
