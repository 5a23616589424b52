// Utility Module
// File helpers for the command-line front end

pub mod file_ops;
