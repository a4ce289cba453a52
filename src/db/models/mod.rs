//! Database models split into domain-specific modules.

pub mod announcement;
pub mod audit;
pub mod career;
pub mod common;
pub mod contact;
pub mod download;
pub mod event;
pub mod faq;
pub mod gallery;
pub mod hero_slide;
pub mod leadership;
pub mod license;
pub mod member;
pub mod news;
pub mod newsletter;
pub mod page;
pub mod partner;
pub mod seo;
pub mod service;
pub mod setting;
pub mod user;

pub use announcement::*;
pub use audit::*;
pub use career::*;
pub use common::*;
pub use contact::*;
pub use download::*;
pub use event::*;
pub use faq::*;
pub use gallery::*;
pub use hero_slide::*;
pub use leadership::*;
pub use license::*;
pub use member::*;
pub use news::*;
pub use newsletter::*;
pub use page::*;
pub use partner::*;
pub use seo::*;
pub use service::*;
pub use setting::*;
pub use user::*;
