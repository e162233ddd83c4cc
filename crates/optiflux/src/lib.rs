#![doc = env!("CARGO_PKG_DESCRIPTION")]

#[doc(inline)]
pub use optiflux_image as image;

#[doc(inline)]
pub use optiflux_flow as flow;
