pub(crate) mod cpu;
pub(crate) mod pipeline;
pub(crate) mod plan;
pub(crate) mod style;
