//! Price feed port trait.

use crate::domain::error::TraderError;
use crate::domain::price::PriceSample;

/// A lazy source of price samples.
///
/// `None` means the feed is exhausted. `Some(Err(_))` is a tick without
/// usable data; the caller skips it and keeps polling.
pub trait PriceFeed {
    fn next_sample(&mut self) -> Option<Result<PriceSample, TraderError>>;
}

impl<F: PriceFeed + ?Sized> PriceFeed for Box<F> {
    fn next_sample(&mut self) -> Option<Result<PriceSample, TraderError>> {
        (**self).next_sample()
    }
}
