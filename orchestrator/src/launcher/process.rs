use crate::launcher::LauncherConfig;
use log::{info, warn};
use piacore::pipeline::{MapInspectorRequest, MonitoringScopeRequest, Visualizer};
use std::ffi::OsString;
use std::path::Path;
use std::process::{Command, Stdio};

/// Starts the front ends as detached child processes and never waits on them.
pub struct ProcessVisualizer {
    config: LauncherConfig,
}

impl ProcessVisualizer {
    pub fn new(config: LauncherConfig) -> Self {
        Self { config }
    }

    fn spawn(&self, program: &str, args: Vec<OsString>) {
        let launched = Command::new(program)
            .args(&args)
            .stdin(Stdio::null())
            .spawn();
        match launched {
            Ok(child) => info!("launched {program} (pid {})", child.id()),
            Err(err) => warn!("could not launch {program}: {err}"),
        }
    }
}

impl Visualizer for ProcessVisualizer {
    fn open_map_inspector(&self, request: &MapInspectorRequest) {
        self.spawn(&self.config.map_inspector, map_inspector_args(request));
    }

    fn open_monitoring_scope(&self, request: &MonitoringScopeRequest) {
        self.spawn(&self.config.monitoring_scope, monitoring_scope_args(request));
    }
}

fn push_path(args: &mut Vec<OsString>, flag: &str, path: &Path) {
    args.push(flag.into());
    args.push(path.as_os_str().to_owned());
}

fn map_inspector_args(request: &MapInspectorRequest) -> Vec<OsString> {
    let mut args = Vec::new();
    push_path(&mut args, "--segment", &request.segment);
    push_path(&mut args, "--xy", &request.xy);
    push_path(&mut args, "--status", &request.status);
    if let Some(addplot) = &request.addplot {
        push_path(&mut args, "--addplot", addplot);
    }
    if request.sharable {
        args.push("--sharable".into());
    }
    push_path(&mut args, "--working-dir", &request.working_dir);
    if let Some(rawcsv) = &request.rawcsv {
        push_path(&mut args, "--rawcsv", rawcsv);
    }
    args
}

fn monitoring_scope_args(request: &MonitoringScopeRequest) -> Vec<OsString> {
    let mut args = Vec::new();
    push_path(&mut args, "--base-xy", &request.base_xy);
    push_path(&mut args, "--add-segment", &request.add_segment);
    push_path(&mut args, "--add-xy", &request.add_xy);
    push_path(&mut args, "--status", &request.status);
    if request.sharable {
        args.push("--sharable".into());
    }
    args
}
