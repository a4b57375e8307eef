pub mod fuzzy_match;
pub mod report;
pub mod restore;
pub mod tokenization;
