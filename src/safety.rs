//! Project safety checks to prevent editing scripts outside the target
//! project.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Guards every script path the applicator writes.
#[derive(Debug, Clone)]
pub struct ProjectGuard {
    /// Absolute path to the project root
    project_root: PathBuf,
    /// Canonical paths to forbidden directories
    forbidden_paths: Vec<PathBuf>,
}

#[derive(Error, Debug)]
pub enum SafetyError {
    #[error("Path is outside project: {path} (project: {project})")]
    OutsideProject { path: PathBuf, project: PathBuf },

    #[error("Path is in forbidden directory: {path} (forbidden: {forbidden})")]
    ForbiddenPath { path: PathBuf, forbidden: PathBuf },

    #[error("Failed to canonicalize path: {0}")]
    Canonicalize(#[from] std::io::Error),
}

impl ProjectGuard {
    /// Create a new project guard with the given root.
    ///
    /// The project root will be canonicalized to handle symlinks correctly.
    pub fn new(project_root: impl AsRef<Path>) -> Result<Self, SafetyError> {
        let project_root = project_root.as_ref().canonicalize()?;

        // Build list of forbidden directories
        let mut forbidden_paths = Vec::new();

        // ~/.gradle - global init scripts, wrapper dists, dependency caches
        if let Some(home) = home::home_dir() {
            if let Ok(gradle_home) = home.join(".gradle").canonicalize() {
                forbidden_paths.push(gradle_home);
            }
        }

        // Generated/cache directories within the project
        if let Ok(build_dir) = project_root.join("build").canonicalize() {
            forbidden_paths.push(build_dir);
        }
        if let Ok(project_cache) = project_root.join(".gradle").canonicalize() {
            forbidden_paths.push(project_cache);
        }

        Ok(Self {
            project_root,
            forbidden_paths,
        })
    }

    /// Check if a path is safe to edit.
    ///
    /// Returns the canonicalized absolute path if safe.
    ///
    /// Note: This performs canonicalization at validation time. For maximum
    /// TOCTOU safety, callers should re-validate immediately before write
    /// operations in adversarial environments.
    pub fn validate_path(&self, path: impl AsRef<Path>) -> Result<PathBuf, SafetyError> {
        let path = path.as_ref();

        // Resolve relative paths against the project root
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        };

        // Canonicalize to resolve symlinks and .. components
        let canonical = absolute.canonicalize()?;

        self.check_canonical(&canonical)?;

        Ok(canonical)
    }

    /// Re-validate a previously-validated canonical path.
    ///
    /// Call this immediately before write to close the TOCTOU window.
    pub fn revalidate(&self, path: &Path) -> Result<PathBuf, SafetyError> {
        let canonical = path.canonicalize()?;
        self.check_canonical(&canonical)?;
        Ok(canonical)
    }

    fn check_canonical(&self, canonical: &Path) -> Result<(), SafetyError> {
        if !canonical.starts_with(&self.project_root) {
            return Err(SafetyError::OutsideProject {
                path: canonical.to_path_buf(),
                project: self.project_root.clone(),
            });
        }

        for forbidden in &self.forbidden_paths {
            if canonical.starts_with(forbidden) {
                return Err(SafetyError::ForbiddenPath {
                    path: canonical.to_path_buf(),
                    forbidden: forbidden.clone(),
                });
            }
        }

        Ok(())
    }

    /// Get the project root.
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Create a guard with custom forbidden paths (for testing).
    #[cfg(test)]
    pub fn with_forbidden(
        project_root: impl AsRef<Path>,
        forbidden: Vec<PathBuf>,
    ) -> Result<Self, SafetyError> {
        let project_root = project_root.as_ref().canonicalize()?;
        Ok(Self {
            project_root,
            forbidden_paths: forbidden,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn validate_path_inside_project() {
        let temp_dir = tempfile::tempdir().unwrap();
        let project = temp_dir.path();
        let guard = ProjectGuard::new(project).unwrap();

        let file = project.join("app/build.gradle");
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(&file, b"").unwrap();

        assert!(guard.validate_path(&file).is_ok());
    }

    #[test]
    fn validate_path_outside_project() {
        let temp_dir = tempfile::tempdir().unwrap();
        let project = temp_dir.path().join("project");
        fs::create_dir_all(&project).unwrap();
        let guard = ProjectGuard::new(&project).unwrap();

        let outside = temp_dir.path().join("build.gradle");
        fs::write(&outside, b"").unwrap();

        let result = guard.validate_path(&outside);
        assert!(matches!(result, Err(SafetyError::OutsideProject { .. })));
    }

    #[test]
    fn validate_path_forbidden() {
        let temp_dir = tempfile::tempdir().unwrap();
        let project = temp_dir.path();
        let forbidden = project.join("build");
        fs::create_dir_all(&forbidden).unwrap();

        let guard = ProjectGuard::with_forbidden(project, vec![forbidden.clone()]).unwrap();

        let file = forbidden.join("generated/build.gradle");
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(&file, b"").unwrap();

        let result = guard.validate_path(&file);
        assert!(matches!(result, Err(SafetyError::ForbiddenPath { .. })));
    }

    #[test]
    fn validate_relative_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let project = temp_dir.path();
        let guard = ProjectGuard::new(project).unwrap();

        let file = project.join("build.gradle");
        fs::write(&file, b"").unwrap();

        assert!(guard.validate_path("build.gradle").is_ok());
    }

    #[test]
    #[cfg(unix)]
    fn validate_symlink_escape() {
        use std::os::unix::fs::symlink;

        let temp_dir = tempfile::tempdir().unwrap();
        let project = temp_dir.path().join("project");
        fs::create_dir_all(&project).unwrap();

        let outside = temp_dir.path().join("build.gradle");
        fs::write(&outside, b"").unwrap();

        let link = project.join("build.gradle");
        symlink(&outside, &link).unwrap();

        let guard = ProjectGuard::new(&project).unwrap();
        let result = guard.validate_path(&link);

        // Rejected because the canonical path is outside the project
        assert!(matches!(result, Err(SafetyError::OutsideProject { .. })));
    }
}
