//! EITP - Internship program portal
//!
//! This library provides the public site, the admin dashboard and the intern
//! dashboard of the EITP internship program as a JSON API.

pub mod api;
pub mod cache;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
