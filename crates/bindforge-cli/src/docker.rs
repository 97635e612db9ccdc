//! Container re-invocation for `bindforge generate`.
//!
//! Rewrites the generation command line for execution inside an image that
//! carries an installed toolchain at the canonical paths, mounting the
//! working directory so outputs land where a local run would put them.

use anyhow::Result;

use bindforge_core::process::ProcessRunner;

use crate::generate::GenerateArgs;

/// Where the image's installation keeps the binding library.
const IMAGE_PYBIND11_SOURCE: &str = "/build/pybind11";

pub fn run_in_docker(image: &str, args: &GenerateArgs) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let cwd = cwd.display();

    let mut command: Vec<String> = [
        "docker",
        "run",
        "--workdir",
    ]
    .map(str::to_string)
    .to_vec();
    command.push(cwd.to_string());
    command.push("-v".to_string());
    command.push(format!("{}:{}", cwd, cwd));
    command.push("-t".to_string());
    command.push(image.to_string());
    command.push("bindforge".to_string());
    command.push("generate".to_string());
    command.extend(reserialize(args));

    ProcessRunner::new().run(&command, None)?;
    Ok(())
}

/// Rebuild the argument list for the in-container run: same generation
/// request, minus the image flag, with the image's canonical tool paths.
fn reserialize(args: &GenerateArgs) -> Vec<String> {
    let mut out = vec![
        "--output-directory".to_string(),
        args.output_directory.display().to_string(),
        "--module-name".to_string(),
        args.module_name.clone(),
        "--project-sources".to_string(),
    ];
    out.extend(args.project_sources.iter().map(|p| p.display().to_string()));

    if !args.source_directories_to_include.is_empty() {
        out.push("--source-directories-to-include".to_string());
        out.extend(
            args.source_directories_to_include
                .iter()
                .map(|p| p.display().to_string()),
        );
    }

    out.push("--config-file".to_string());
    out.push(args.config_file.display().to_string());

    if !args.extra_binder_flags.is_empty() {
        out.push("--extra-binder-flags".to_string());
        out.push(args.extra_binder_flags.clone());
    }
    if !args.include_line_ignore_words.is_empty() {
        out.push("--include-line-ignore-words".to_string());
        out.extend(args.include_line_ignore_words.iter().cloned());
    }
    if let Some(script) = &args.preinstall_script {
        out.push("--preinstall-script".to_string());
        out.push(script.display().to_string());
    }
    if let Some(closure) = &args.custom_all_includes_file {
        out.push("--custom-all-includes-file".to_string());
        out.push(closure.display().to_string());
    }
    if let Some(platform) = &args.platform_include_dir {
        out.push("--platform-include-dir".to_string());
        out.push(platform.display().to_string());
    }

    out.push("--jobs".to_string());
    out.push(args.jobs.to_string());

    out.push("--pybind11-source".to_string());
    out.push(IMAGE_PYBIND11_SOURCE.to_string());
    out.push("--binder-executable".to_string());
    out.push("binder".to_string());
    out
}
