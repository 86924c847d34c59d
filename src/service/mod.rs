pub mod appointment_service;
