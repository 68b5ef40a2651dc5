// This file is part of zinc64.
// Copyright (c) 2016-2019 Sebastian Jastrzebski. All rights reserved.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

mod chip_factory;
mod system_model;
mod types;

pub use self::chip_factory::ChipFactory;
pub use self::system_model::{SidModel, SystemModel, VicModel};
pub use self::types::*;
