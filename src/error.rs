// Copyright (c) 2024-present, arana-db Community.  All rights reserved.
//
// Licensed to the Apache Software Foundation (ASF) under one or more
// contributor license agreements.  See the NOTICE file distributed with
// this work for additional information regarding copyright ownership.
// The ASF licenses this file to You under the Apache License, Version 2.0
// (the "License"); you may not use this file except in compliance with
// the License.  You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Error types for the sorted set engine

use snafu::{Location, Snafu};

pub type Result<T> = std::result::Result<T, Error>;

pub const STALE_TAG: &str = "Stale";

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("RocksDB error"))]
    Rocks {
        #[snafu(source)]
        error: rocksdb::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Key not found: {message}"))]
    KeyNotFound {
        message: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Corruption: {message}"))]
    Corruption {
        message: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Invalid argument: {message}"))]
    InvalidArgument {
        message: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Missing value: {message}"))]
    OptionNone {
        message: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Unknown error: {message}"))]
    Unknown {
        message: String,
        #[snafu(implicit)]
        location: Location,
    },
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::KeyNotFound { .. })
    }

    /// True when the key existed but its TTL has already passed.
    pub fn is_stale(&self) -> bool {
        matches!(self, Error::KeyNotFound { message, .. } if message == STALE_TAG)
    }
}
