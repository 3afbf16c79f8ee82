pub mod history;
pub mod plan;
pub mod project;
pub mod rates;
pub mod risk;
pub mod scenario;
pub mod setup;
pub mod ui;
