pub mod css_matcher;
pub mod resolver;
pub mod stylesheet;
