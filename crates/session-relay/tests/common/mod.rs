// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![allow(dead_code)]
#![allow(clippy::unwrap_used)]

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use session_relay::{Entry, Metadata, Transport, TransportError};

/// Transport that records every call and can be told to fail.
#[derive(Default)]
pub struct MockTransport {
    pub registrations: Mutex<Vec<Metadata>>,
    pub uploads: Mutex<Vec<(Vec<Entry>, String)>>,
    pub fail_uploads: AtomicBool,
    pub fail_registration: AtomicBool,
}

impl MockTransport {
    pub fn registration_count(&self) -> usize {
        self.registrations.lock().unwrap().len()
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.lock().unwrap().len()
    }

    pub fn uploaded_entries(&self) -> Vec<Entry> {
        self.uploads
            .lock()
            .unwrap()
            .iter()
            .flat_map(|(entries, _)| entries.clone())
            .collect()
    }

    pub fn set_fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn register_session(&self, metadata: &Metadata) -> Result<String, TransportError> {
        if self.fail_registration.load(Ordering::SeqCst) {
            return Err(TransportError::UnexpectedStatus(500));
        }
        let mut registrations = self.registrations.lock().unwrap();
        registrations.push(metadata.clone());
        Ok(format!("remote-{}", registrations.len()))
    }

    async fn upload_entries(
        &self,
        entries: &[Entry],
        remote_identifier: &str,
    ) -> Result<(), TransportError> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(TransportError::UnexpectedStatus(503));
        }
        self.uploads
            .lock()
            .unwrap()
            .push((entries.to_vec(), remote_identifier.to_string()));
        Ok(())
    }
}

pub fn read_lines(path: &Path) -> Vec<Entry> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|line| Entry::from_line(line).unwrap())
        .collect()
}

pub fn outfiles(session_dir: &Path) -> Vec<std::path::PathBuf> {
    let dir = session_dir.join("out").join("entries");
    let Ok(read_dir) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut files: Vec<_> = read_dir.map(|e| e.unwrap().path()).collect();
    files.sort();
    files
}
