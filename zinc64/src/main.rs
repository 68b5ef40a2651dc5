// This file is part of zinc64.
// Copyright (c) 2016-2019 Sebastian Jastrzebski. All rights reserved.
// Licensed under the GPLv3. See LICENSE file in the project root for full license text.

#[macro_use]
extern crate log;

mod app;
mod audio;
mod cli;
mod console;
mod execution;
mod input;
mod palette;
mod sound_buffer;
mod util;
mod video_buffer;
mod video_renderer;

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::process;
use std::rc::Rc;
use std::sync::Arc;

use anyhow::Context;
use structopt::StructOpt;
use zinc64_core::util::new_shared;
use zinc64_drive::Drive1541;
use zinc64_loader::Loaders;
use zinc64_system::{C64Factory, C64};

use crate::app::App;
use crate::cli::Opt;
use crate::console::ConsoleApp;
use crate::palette::Palette;
use crate::sound_buffer::SoundBuffer;
use crate::util::{FileReader, Logger};
use crate::video_buffer::VideoBuffer;

static NAME: &str = "zinc64";

fn main() {
    let opt = Opt::from_args();
    match run(&opt) {
        Ok(_) => process::exit(0),
        Err(err) => {
            println!("Error: {}", err);
            process::exit(1)
        }
    };
}

fn load_image(c64: &mut C64, path: &Path) -> Result<(), String> {
    let ext = path.extension().map(|s| s.to_str().unwrap());
    let loader = Loaders::from_ext(ext)?;
    let file = File::open(path).map_err(|err| format!("{}", err))?;
    let mut reader = FileReader(BufReader::new(file));
    let mut autostart = loader.autostart(&mut reader)?;
    autostart.execute(c64);
    Ok(())
}

fn run(opt: &Opt) -> anyhow::Result<()> {
    let logger = Logger::build(opt.log_level.as_str(), &opt.log_target_level)
        .map_err(anyhow::Error::msg)
        .context("failed to configure logging")?;
    Logger::enable(logger)
        .map_err(anyhow::Error::msg)
        .context("failed to enable logging")?;
    info!("Starting {}", NAME);
    let config = Rc::new(cli::build_emu_config(opt).map_err(anyhow::Error::msg)?);
    let sound_buffer = Arc::new(SoundBuffer::new(config.sound.buffer_size << 2));
    let video_buffer = new_shared(VideoBuffer::new(
        config.model.frame_buffer_size.0,
        config.model.frame_buffer_size.1,
        Palette::default(),
    ));
    let chip_factory = Box::new(C64Factory::new(config.clone()));
    let mut c64 = C64::build(
        config.clone(),
        &*chip_factory,
        video_buffer.clone(),
        sound_buffer.clone(),
    );
    cli::set_c64_options(&mut c64, opt).map_err(anyhow::Error::msg)?;
    if config.drive.enable {
        let mut drive = Drive1541::new(&config.drive.rom);
        drive.reset();
        c64.attach_drive_8(drive);
        c64.set_drive8_path(config.drive.drive8_path.clone());
        if let Some(ref drive8_path) = config.drive.drive8_path {
            let data = std::fs::read(drive8_path)
                .map_err(|err| anyhow::Error::msg(format!("{}", err)))?;
            c64.mount_disk_image_8(data);
        }
    }
    c64.reset(true);
    if let Some(image_path) = &opt.image {
        load_image(&mut c64, Path::new(image_path)).map_err(anyhow::Error::msg)?;
    }
    if opt.console {
        let mut console = ConsoleApp::new(c64);
        console.run();
    } else {
        let app_options = cli::build_app_options(opt).map_err(anyhow::Error::msg)?;
        let mut app = App::build(c64, video_buffer, sound_buffer, app_options)
            .map_err(anyhow::Error::msg)?;
        app.run().map_err(anyhow::Error::msg)?;
    }
    Ok(())
}
