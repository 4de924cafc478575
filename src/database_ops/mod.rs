pub mod alerts;
pub mod catalog;
pub mod db;
pub mod omdb;
pub mod tmdb;
