pub mod numero;
pub mod orcamento;
pub mod orcamento_handler;
pub mod orcamento_model;
