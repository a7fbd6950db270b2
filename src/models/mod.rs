pub mod event;
pub mod parcel;
pub mod user;
pub mod view;
