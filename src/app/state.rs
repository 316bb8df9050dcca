// Copyright 2021 Datafuse Labs
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use log::{info, warn};

use crate::{error::AppError, execute::validate_filters, report::FilterCondition};

#[derive(Clone)]
pub struct AppState {
    allow_raw_filters: bool,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let AppConfig { allow_raw_filters } = config;
        if allow_raw_filters {
            warn!("report filter validation disabled; filter values reach SQL unchecked");
        } else {
            info!("report filter validation enabled");
        }
        Self { allow_raw_filters }
    }

    pub fn check_filters(&self, filters: &[FilterCondition]) -> Result<(), AppError> {
        if self.allow_raw_filters {
            return Ok(());
        }
        validate_filters(filters)
    }
}

pub struct AppConfig {
    pub allow_raw_filters: bool,
}
