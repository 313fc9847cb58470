/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Context;
use log::{debug, warn};
use tokio::sync::Barrier;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::client::{BenchTarget, BenchTaskContext, DebugClient, HostTarget, PipelineTarget};
use crate::limiter::RateLimiter;
use crate::opts::{BenchmarkConfig, ClientMode};
use crate::progress::{self, BenchProgress};
use crate::stats::{StatAggregator, ThroughputCounter};

async fn run_worker<C: BenchTaskContext>(
    mut context: C,
    aggregator: Arc<StatAggregator>,
    limiter: Arc<RateLimiter>,
    barrier: Arc<Barrier>,
) {
    barrier.wait().await;

    let token = aggregator.cancel_token().clone();
    while !token.is_cancelled() {
        if !limiter.allow() {
            tokio::task::yield_now().await;
            continue;
        }

        let outcome = tokio::select! {
            biased;

            _ = token.cancelled() => break,
            o = context.issue() => o,
        };
        aggregator.record(outcome);
    }
}

/// Run `connections` workers against `target` until the aggregator stops them.
pub async fn run_workers<T: BenchTarget>(
    target: &T,
    connections: usize,
    aggregator: Arc<StatAggregator>,
    limiter: Arc<RateLimiter>,
) {
    let barrier = Arc::new(Barrier::new(connections + 1));
    let mut tasks = JoinSet::new();
    for _ in 0..connections {
        let context = target.new_context();
        tasks.spawn(run_worker(
            context,
            aggregator.clone(),
            limiter.clone(),
            barrier.clone(),
        ));
    }

    barrier.wait().await;
    aggregator.start();
    debug!("{connections} workers started");

    while let Some(r) = tasks.join_next().await {
        if let Err(e) = r {
            warn!("worker task failed: {e}");
        }
    }
}

fn spawn_sigint_handler(aggregator: Arc<StatAggregator>) {
    let token = aggregator.cancel_token().clone();
    tokio::spawn(async move {
        tokio::select! {
            r = tokio::signal::ctrl_c() => match r {
                Ok(_) => aggregator.terminate(),
                Err(e) => warn!("failed to listen for SIGINT: {e}"),
            },
            _ = token.cancelled() => {}
        }
    });
}

async fn run_debug(config: &BenchmarkConfig) -> anyhow::Result<()> {
    let dialer = config.new_dialer(Arc::new(ThroughputCounter::default()));
    let client = DebugClient::new(
        config.request.clone(),
        dialer,
        config.tls_args.clone(),
        Some(config.timeout),
        config.max_redirects,
    );

    let mut buf = Vec::with_capacity(4096);
    client.run(&mut buf).await?;

    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(&buf)
        .context("failed to write to stdout")?;
    stdout.flush().context("failed to flush stdout")?;
    Ok(())
}

async fn run_bench(config: &BenchmarkConfig) -> anyhow::Result<()> {
    let throughput = Arc::new(ThroughputCounter::default());
    let dialer = config.new_dialer(throughput.clone());
    let connector = config.new_connector(dialer);
    let prototype = Arc::new(config.new_prototype());

    let aggregator = Arc::new(StatAggregator::new(
        config.stop_mode,
        CancellationToken::new(),
        throughput,
    ));
    let limiter = Arc::new(RateLimiter::new(config.qps));
    spawn_sigint_handler(aggregator.clone());

    println!("{}", progress::title(config.url.as_str(), config.connections));

    let quit_notifier = Arc::new(AtomicBool::new(false));
    let progress_handler = if config.no_progress_bar {
        None
    } else {
        Some(BenchProgress::new(aggregator.clone()).spawn(quit_notifier.clone())?)
    };

    match config.mode {
        ClientMode::Pipeline => {
            let target = PipelineTarget::new(prototype, connector, config.connections);
            debug!("using {} pipelined connections", target.slot_count());
            run_workers(&target, config.connections, aggregator.clone(), limiter).await;
        }
        _ => {
            let target = HostTarget::new(prototype, connector, config.request.keep_alive);
            run_workers(&target, config.connections, aggregator.clone(), limiter).await;
        }
    }

    quit_notifier.store(true, Ordering::Relaxed);
    if let Some(handler) = progress_handler
        && let Err(e) = handler.join()
    {
        warn!("error to join progress bar thread: {e:?}");
    }

    progress::print_summary(&aggregator);
    Ok(())
}

pub async fn run(config: BenchmarkConfig) -> anyhow::Result<()> {
    match config.mode {
        ClientMode::Debug => run_debug(&config).await,
        ClientMode::Host | ClientMode::Pipeline => run_bench(&config).await,
    }
}
