pub mod bloco;
pub mod bloco_handler;
pub mod bloco_model;
