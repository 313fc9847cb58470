/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::process::ExitCode;

use anyhow::Context;

fn main() -> anyhow::Result<ExitCode> {
    // fails only if a provider is installed already
    let _ = rustls::crypto::ring::default_provider().install_default();

    let args = httpgo::opts::build_cli_args().get_matches();
    if httpgo::opts::print_and_exit(&args) {
        return Ok(ExitCode::SUCCESS);
    }

    let _log_guard = httpgo::log::setup(httpgo::opts::verbose_level(&args))
        .context("failed to setup logger")?;

    let config = httpgo::opts::parse_args(&args)?;

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start main runtime")?;
    rt.block_on(httpgo::engine::run(config))?;
    Ok(ExitCode::SUCCESS)
}
