pub mod default_model;
