// This file is part of zinc64.
// Copyright (c) 2016-2019 Sebastian Jastrzebski. All rights reserved.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

use std::collections::HashMap;
use std::str::FromStr;

use log::{LogLevel, LogMetadata, LogRecord};

pub struct Logger {
    level: LogLevel,
    targets: HashMap<String, LogLevel>,
}

impl Logger {
    pub fn build(level: &str, target_levels: &[(String, String)]) -> Result<Logger, String> {
        let level = LogLevel::from_str(level).map_err(|_| format!("invalid log level {}", level))?;
        let mut logger = Logger {
            level,
            targets: HashMap::new(),
        };
        for (target, level) in target_levels {
            logger.add_target(target.clone(), level.clone())?;
        }
        Ok(logger)
    }

    pub fn enable(logger: Logger) -> Result<(), String> {
        log::set_logger(|max_log_level| {
            max_log_level.set(logger.get_level().to_log_level_filter());
            Box::new(logger)
        })
        .map_err(|_| "cannot initialize logging".to_string())
    }

    pub fn add_target(&mut self, target: String, level: String) -> Result<(), String> {
        let level = LogLevel::from_str(&level)
            .map_err(|_| format!("invalid log level {} for target {}", level, &target))?;
        self.targets.insert(target, level);
        Ok(())
    }

    pub fn get_level(&self) -> LogLevel {
        self.level
    }
}

impl log::Log for Logger {
    fn enabled(&self, metadata: &LogMetadata) -> bool {
        if let Some(target_level) = self.targets.get(metadata.target()) {
            metadata.level() <= *target_level
        } else {
            metadata.level() <= self.level
        }
    }

    fn log(&self, record: &LogRecord) {
        if self.enabled(record.metadata()) {
            println!(
                "{} [{}] - {}",
                record.level(),
                record.target(),
                record.args()
            );
        }
    }
}
