//! Cleanup runs against fake tooling

mod helpers;

use helpers::*;
use sts_installer::execution::{Cleanup, CleanupError, CleanupOptions, CleanupOutcome};

fn options(workspace: &Workspace) -> CleanupOptions {
    CleanupOptions {
        cluster_name: "sts-demo".to_string(),
        region: "us-east-2".to_string(),
        release_image: None,
        aws_profile: "default".to_string(),
        aws_credentials_file: Some(workspace.root().join("aws-credentials")),
        assume_yes: false,
    }
}

#[tokio::test]
async fn test_cleanup_without_artifacts_uses_ccoctl_on_path() {
    let workspace = Workspace::new();
    let tools = FakeTools::new(&workspace);
    let mut options = options(&workspace);
    options.assume_yes = true;

    let outcome = Cleanup::new(options, workspace.root(), tools.clone(), no_answers())
        .run()
        .await
        .unwrap();

    assert_eq!(outcome, CleanupOutcome::Completed { cluster_destroyed: false });
    assert_eq!(
        tools.commands(),
        vec!["ccoctl aws delete --name sts-demo --region us-east-2"]
    );
}

#[tokio::test]
async fn test_declined_cleanup_touches_nothing() {
    let workspace = Workspace::new();
    let tools = FakeTools::new(&workspace);
    let prompter = ScriptedPrompter::answering(&[false]);

    let options = options(&workspace);
    let cleanup = Cleanup::new(options, workspace.root(), tools.clone(), prompter.clone());
    let outcome = cleanup.run()
        .await
        .unwrap();

    assert_eq!(outcome, CleanupOutcome::Cancelled);
    assert!(tools.commands().is_empty());
    assert!(prompter.questions()[0].contains("cluster 'sts-demo' in region 'us-east-2'"));
}

#[tokio::test]
async fn test_cleanup_after_install_destroys_cluster_first() {
    let workspace = Workspace::new();
    workspace.write_credentials();
    let tools = FakeTools::new(&workspace);
    run_install(&workspace, workspace.config(), tools.clone(), no_answers()).await;
    tools.reset_calls();

    let mut options = options(&workspace);
    options.release_image = Some(RELEASE.to_string());
    let prompter = ScriptedPrompter::answering(&[true, true]);
    let outcome = Cleanup::new(options, workspace.root(), tools.clone(), prompter)
        .run()
        .await
        .unwrap();

    assert_eq!(outcome, CleanupOutcome::Completed { cluster_destroyed: true });
    let calls = tools.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls[0].command.contains("openshift-install destroy cluster"));
    assert!(calls[0].interactive);

    // The extracted ccoctl is preferred over one on PATH
    let ccoctl = workspace.path("bin/ccoctl").display().to_string();
    assert!(calls[1].command.starts_with(&format!("{} aws delete", ccoctl)));
    assert!(calls[1]
        .envs
        .contains(&("AWS_ACCESS_KEY_ID".to_string(), "AKIAWORKSPACE".to_string())));
}

#[tokio::test]
async fn test_keeping_the_cluster_still_deletes_resources() {
    let workspace = Workspace::new();
    let tools = FakeTools::new(&workspace);
    run_install(&workspace, workspace.config(), tools.clone(), no_answers()).await;
    tools.reset_calls();

    let mut options = options(&workspace);
    options.release_image = Some(RELEASE.to_string());
    let prompter = ScriptedPrompter::answering(&[true, false]);
    let outcome = Cleanup::new(options, workspace.root(), tools.clone(), prompter)
        .run()
        .await
        .unwrap();

    assert_eq!(outcome, CleanupOutcome::Completed { cluster_destroyed: false });
    assert!(!tools.ran("destroy cluster"));
    assert!(tools.ran("aws delete --name sts-demo"));
}

#[tokio::test]
async fn test_failed_delete_is_reported() {
    let workspace = Workspace::new();
    let tools = FakeTools::new(&workspace);
    tools.fail_on("aws delete");
    let mut options = options(&workspace);
    options.assume_yes = true;

    let result = Cleanup::new(options, workspace.root(), tools, no_answers())
        .run()
        .await;

    assert!(matches!(result, Err(CleanupError::Delete(_))));
}

#[tokio::test]
async fn test_bad_release_image_is_rejected() {
    let workspace = Workspace::new();
    let tools = FakeTools::new(&workspace);
    let mut options = options(&workspace);
    options.assume_yes = true;
    options.release_image = Some("not-a-release".to_string());

    let result = Cleanup::new(options, workspace.root(), tools.clone(), no_answers())
        .run()
        .await;

    assert!(matches!(result, Err(CleanupError::Config(_))));
    assert!(tools.commands().is_empty());
}
