// src/fetch/providers/mod.rs
pub mod naver;
pub mod youtube;

pub use naver::{NaverCredentials, NaverSearchProvider, NaverVertical, DEFAULT_NAVER_API_BASE};
pub use youtube::{SecondaryQuery, YoutubeSearchProvider, DEFAULT_YOUTUBE_API_BASE};
