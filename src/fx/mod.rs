// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod cache;
pub mod converter;
pub mod fallback;
pub mod resolver;
pub mod store;

pub use cache::{cache_key, RateCache, SqliteRateCache};
pub use converter::round_money;
pub use fallback::{FallbackKind, FallbackRates};
pub use resolver::{DataQualityWarning, FxService, RateOrigin, Resolution};
