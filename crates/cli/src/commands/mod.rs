pub(crate) mod compile;
pub(crate) mod convert;
pub(crate) mod eval;
pub(crate) mod lint;
