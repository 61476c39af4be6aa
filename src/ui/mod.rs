pub mod design_tokens;
pub mod histogram;
pub mod panels;
