pub mod create_template;
