pub mod register_system;
