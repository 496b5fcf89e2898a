pub mod preview_proptest;
pub mod subscription_proptest;
pub mod unread_proptest;
