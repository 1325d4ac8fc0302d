//! Integration tests for wakeguard
//!
//! These tests drive the service loop end to end against the mock host.

use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;
use tokio::sync::{mpsc, oneshot};
use wakeguard::{Redirect, RunSummary, Service, redirect};
use wakeguard_api::{SuppressionMode, TickInterval};
use wakeguard_core::ExitReason;
use wakeguard_host_api::{
    ExecutionState, HostCapabilities, MessageLevel, MockHost, PowerRequest, PromptOutcome,
};
use wakeguard_host_linux::{Acquire, acquire_at};
use wakeguard_ipc::{ActivationServer, ServerMessage};
use wakeguard_util::{InstanceName, WakeguardError};

async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..400 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached in time");
}

fn spawn_service(service: Service) -> tokio::task::JoinHandle<wakeguard_util::Result<RunSummary>> {
    tokio::spawn(service.run())
}

#[tokio::test]
async fn menu_exit_restores_baseline() {
    let host = Arc::new(MockHost::new());
    let service = Service::new(host.clone(), SuppressionMode::Declarative);
    host.surface.select_exit();

    let summary = service.run().await.unwrap();

    assert_eq!(summary.reason, ExitReason::MenuExit);
    assert!(!summary.baseline.is_active());
    assert!(host.power.current().is_baseline());
    assert_eq!(
        host.power.history(),
        vec![ExecutionState::SUPPRESSING, ExecutionState::BASELINE]
    );
    assert!(host.surface.tray().is_none());
    assert_eq!(host.surface.hide_calls(), 1);
}

#[tokio::test]
async fn signal_exit_restores_baseline() {
    let host = Arc::new(MockHost::new());
    let service = Service::new(host.clone(), SuppressionMode::Declarative);
    let shutdown = service.shutdown_handle();

    let task = spawn_service(service);
    wait_until(|| host.surface.tray().is_some()).await;
    assert_eq!(host.power.current(), ExecutionState::SUPPRESSING);

    shutdown.request(ExitReason::Signal("SIGHUP"));
    let summary = task.await.unwrap().unwrap();

    assert_eq!(summary.reason, ExitReason::Signal("SIGHUP"));
    assert!(host.power.current().is_baseline());
    assert!(host.surface.tray().is_none());
}

#[tokio::test]
async fn confirmed_status_prompt_exits() {
    let host = Arc::new(MockHost::new());
    let service = Service::new(host.clone(), SuppressionMode::Declarative);
    host.surface.script_prompt(PromptOutcome::Confirmed);
    host.surface.click();

    let summary = service.run().await.unwrap();

    assert_eq!(summary.reason, ExitReason::StatusConfirmed);
    assert_eq!(summary.prompts_shown, 1);
    let prompts = host.surface.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].body.contains("Press OK"));
    assert!(host.power.current().is_baseline());
}

#[tokio::test]
async fn dismissed_prompt_keeps_running() {
    let host = Arc::new(MockHost::new());
    let service = Service::new(host.clone(), SuppressionMode::Declarative);
    let shutdown = service.shutdown_handle();
    host.surface.click();

    let task = spawn_service(service);
    wait_until(|| host.surface.prompts().len() == 1).await;

    // Still suppressing after the dismissal, and a second prompt can open
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(host.power.current(), ExecutionState::SUPPRESSING);
    host.surface.click();
    wait_until(|| host.surface.prompts().len() == 2).await;

    shutdown.request(ExitReason::MenuExit);
    let summary = task.await.unwrap().unwrap();
    assert_eq!(summary.prompts_shown, 2);
    assert!(host.power.current().is_baseline());
}

#[tokio::test]
async fn rapid_triggers_show_one_prompt() {
    let host = Arc::new(MockHost::new());
    host.surface.hold_prompts(true);

    let (activation_tx, activation_rx) = mpsc::unbounded_channel();
    let service =
        Service::new(host.clone(), SuppressionMode::Declarative).with_activations(activation_rx);
    let shutdown = service.shutdown_handle();

    host.surface.click();
    let task = spawn_service(service);
    wait_until(|| host.surface.prompts().len() == 1).await;

    // A second click and a forwarded activation while the prompt is open
    host.surface.click();
    let (reply, answer) = oneshot::channel();
    activation_tx
        .send(ServerMessage::Activate {
            request_id: 1,
            reply,
        })
        .unwrap();
    assert!(!answer.await.unwrap());

    host.surface.release_prompt();
    shutdown.request(ExitReason::MenuExit);
    let summary = task.await.unwrap().unwrap();

    assert_eq!(host.surface.prompts().len(), 1);
    assert_eq!(summary.prompts_shown, 1);
}

#[tokio::test(start_paused = true)]
async fn synthetic_mode_ticks_at_interval() {
    let host = Arc::new(MockHost::new());
    let mode = SuppressionMode::synthetic(TickInterval::from_secs(45).unwrap());
    let service = Service::new(host.clone(), mode);
    let shutdown = service.shutdown_handle();

    let task = spawn_service(service);
    tokio::time::sleep(Duration::from_secs(136)).await;
    shutdown.request(ExitReason::MenuExit);
    let summary = task.await.unwrap().unwrap();

    assert_eq!(summary.ticks.total(), 3);
    assert_eq!(host.input.calls() as u64, summary.ticks.delivered);
    assert!(host.power.history().is_empty());
    assert_eq!(summary.baseline.interval_secs(), Some(45));
}

#[tokio::test(start_paused = true)]
async fn rejected_injections_do_not_stop_suppression() {
    let host = Arc::new(MockHost::new());
    host.input.set_fail(true);
    let mode = SuppressionMode::synthetic(TickInterval::DEFAULT);
    let service = Service::new(host.clone(), mode);
    let shutdown = service.shutdown_handle();

    let task = spawn_service(service);
    tokio::time::sleep(Duration::from_secs(35)).await;
    shutdown.request(ExitReason::MenuExit);
    let summary = task.await.unwrap().unwrap();

    assert_eq!(summary.reason, ExitReason::MenuExit);
    assert_eq!(summary.ticks.delivered, 0);
    assert_eq!(summary.ticks.rejected + summary.ticks.skipped, 3);
}

#[tokio::test]
async fn unsupported_mode_never_asserts() {
    let host = Arc::new(MockHost::new().with_capabilities(HostCapabilities::minimal()));
    let mode = SuppressionMode::synthetic(TickInterval::DEFAULT);

    let result = Service::new(host.clone(), mode).run().await;

    assert!(matches!(result, Err(WakeguardError::HostError(_))));
    assert!(host.surface.tray().is_none());
    assert_eq!(host.input.calls(), 0);
}

#[tokio::test]
async fn failed_assert_leaves_baseline() {
    let host = Arc::new(MockHost::new());
    host.power.set_fail(true);

    let result = Service::new(host.clone(), SuppressionMode::Declarative)
        .run()
        .await;

    assert!(result.is_err());
    assert!(host.power.current().is_baseline());
    assert!(host.surface.tray().is_none());
}

#[test]
fn second_launch_is_deferred() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("wakeguard.declarative.lock");
    let name = InstanceName::declarative();

    let primary = acquire_at(&name, &path).unwrap();
    assert!(matches!(primary, Acquire::Exclusive(_)));
    assert!(matches!(acquire_at(&name, &path).unwrap(), Acquire::Deferred));
}

#[tokio::test]
async fn unreachable_primary_gets_informational_message() {
    let dir = tempdir().unwrap();
    let host = MockHost::new();

    let outcome = redirect(
        &InstanceName::declarative(),
        &dir.path().join("missing.sock"),
        host.surface.as_ref(),
    )
    .await;

    assert_eq!(outcome, Redirect::Informed);
    let messages = host.surface.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].0, MessageLevel::Info);
    assert!(messages[0].2.contains("already running"));
    assert!(messages[0].2.contains("Another instance holds 'wakeguard.declarative'"));
    // Nothing was asserted by the duplicate
    assert!(host.power.history().is_empty());
}

#[tokio::test]
async fn duplicate_launch_activates_primary() {
    let dir = tempdir().unwrap();
    let socket = dir.path().join("wakeguard.declarative.sock");

    let primary = Arc::new(MockHost::new());
    let mut server = ActivationServer::new(&socket);
    server.start().await.unwrap();
    let server = Arc::new(server);
    let activations = server.take_message_receiver().await.unwrap();
    let accept = server.clone();
    tokio::spawn(async move {
        let _ = accept.run().await;
    });

    let service =
        Service::new(primary.clone(), SuppressionMode::Declarative).with_activations(activations);
    let shutdown = service.shutdown_handle();
    let task = spawn_service(service);
    wait_until(|| primary.surface.tray().is_some()).await;

    let duplicate = MockHost::new();
    let outcome = redirect(
        &InstanceName::declarative(),
        &socket,
        duplicate.surface.as_ref(),
    )
    .await;

    assert_eq!(outcome, Redirect::Forwarded { prompt_opened: true });
    wait_until(|| primary.surface.prompts().len() == 1).await;
    assert!(duplicate.surface.messages().is_empty());

    shutdown.request(ExitReason::MenuExit);
    task.await.unwrap().unwrap();
    assert!(primary.power.current().is_baseline());
}
