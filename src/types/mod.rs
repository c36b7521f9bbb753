pub mod answer;
pub mod category;
pub mod pagination;
pub mod principal;
pub mod question;
pub mod vote;
