pub mod e_macros;
