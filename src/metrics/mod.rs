//! Metrics sinks.
//!
//! An [`ExpirationSink`] is the destination of [`observe`](crate::observe): a
//! keyed store of gauge values where each write replaces the previous value of
//! the same [`LabelTuple`]. Implementations must tolerate concurrent writers.
//!
//! # Submodules
//!
//! - `prom` - Prometheus gauge vector, text exposition and Pushgateway support

use std::sync::Arc;

use crate::LabelTuple;

pub mod prom;

/// Destination for expiration observations.
pub trait ExpirationSink {
    /// Sets the current value of the series identified by `labels`.
    fn set_value(&self, labels: &LabelTuple, value: f64);
}

impl<T: ExpirationSink + ?Sized> ExpirationSink for &T {
    fn set_value(&self, labels: &LabelTuple, value: f64) {
        (**self).set_value(labels, value)
    }
}

impl<T: ExpirationSink + ?Sized> ExpirationSink for Box<T> {
    fn set_value(&self, labels: &LabelTuple, value: f64) {
        (**self).set_value(labels, value)
    }
}

impl<T: ExpirationSink + ?Sized> ExpirationSink for Arc<T> {
    fn set_value(&self, labels: &LabelTuple, value: f64) {
        (**self).set_value(labels, value)
    }
}
