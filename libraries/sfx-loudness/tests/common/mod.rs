/// Common test utilities: a scripted loudness engine and file fixtures
use async_trait::async_trait;
use sfx_loudness::{
    EncoderProfile, EngineOutput, FilterSpec, LoudnessEngine, MeasureRequest, NormalizeError,
    Result,
};
use std::collections::{HashMap, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// What the fake engine does when asked to render a file
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub enum ApplyScript {
    /// Write these bytes to the output and exit cleanly
    Succeed(Vec<u8>),
    /// Write a partial output, then exit with an error
    Fail(Vec<u8>),
    /// The process could not even be spawned
    SpawnError,
}

/// Engine calls, in order
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CheckAvailable,
    Measure { path: PathBuf, target_lufs: f64 },
    Apply { path: PathBuf, filter: String, output: PathBuf },
}

/// Deterministic engine returning scripted measurements and outcomes
pub struct ScriptedEngine {
    available: bool,
    measurements: Mutex<HashMap<PathBuf, VecDeque<EngineOutput>>>,
    applies: Mutex<HashMap<PathBuf, ApplyScript>>,
    calls: Mutex<Vec<Call>>,
}

#[allow(dead_code)]
impl ScriptedEngine {
    pub fn new() -> Self {
        Self {
            available: true,
            measurements: Mutex::new(HashMap::new()),
            applies: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    /// Queue a measurement result for `path` (consumed in order)
    pub fn push_measurement(&self, path: &Path, output: EngineOutput) {
        self.measurements
            .lock()
            .unwrap()
            .entry(path.to_path_buf())
            .or_default()
            .push_back(output);
    }

    /// Queue a successful loudnorm report
    pub fn push_loudnorm(&self, path: &Path, input_i: &str, input_tp: &str) {
        self.push_measurement(path, EngineOutput::success(loudnorm_report(input_i, input_tp)));
    }

    pub fn script_apply(&self, path: &Path, script: ApplyScript) {
        self.applies
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), script);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn apply_calls(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Apply { .. }))
            .collect()
    }

    pub fn measure_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Measure { .. }))
            .count()
    }
}

#[async_trait]
impl LoudnessEngine for ScriptedEngine {
    async fn check_available(&self) -> Result<()> {
        self.calls.lock().unwrap().push(Call::CheckAvailable);
        if self.available {
            Ok(())
        } else {
            Err(NormalizeError::EngineUnavailable(
                "scripted engine is offline".to_string(),
            ))
        }
    }

    async fn measure(&self, input: &Path, request: &MeasureRequest) -> Result<EngineOutput> {
        self.calls.lock().unwrap().push(Call::Measure {
            path: input.to_path_buf(),
            target_lufs: request.target_lufs,
        });

        let next = self
            .measurements
            .lock()
            .unwrap()
            .get_mut(input)
            .and_then(VecDeque::pop_front);

        Ok(next.unwrap_or_else(|| EngineOutput::failure("no measurement scripted")))
    }

    async fn apply_filter(
        &self,
        input: &Path,
        filter: &FilterSpec,
        _profile: &EncoderProfile,
        output: &Path,
    ) -> Result<EngineOutput> {
        self.calls.lock().unwrap().push(Call::Apply {
            path: input.to_path_buf(),
            filter: filter.as_str().to_string(),
            output: output.to_path_buf(),
        });

        let script = self
            .applies
            .lock()
            .unwrap()
            .get(input)
            .cloned()
            .unwrap_or(ApplyScript::Fail(Vec::new()));

        match script {
            ApplyScript::Succeed(bytes) => {
                fs::write(output, bytes)?;
                Ok(EngineOutput::success("size=N/A time=00:00:01.00"))
            }
            ApplyScript::Fail(partial) => {
                fs::write(output, partial)?;
                Ok(EngineOutput::failure(
                    "Error while filtering: Invalid argument\nConversion failed!",
                ))
            }
            ApplyScript::SpawnError => Err(NormalizeError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "engine binary vanished",
            ))),
        }
    }
}

/// Diagnostic text shaped like ffmpeg's loudnorm output
pub fn loudnorm_report(input_i: &str, input_tp: &str) -> String {
    format!(
        "Input #0, wav, from 'clip.wav':\n  Duration: 00:00:00.35\n[Parsed_loudnorm_0 @ 0x55d1c0a3f2c0]\n{{\n\t\"input_i\" : \"{input_i}\",\n\t\"input_tp\" : \"{input_tp}\",\n\t\"input_lra\" : \"0.00\",\n\t\"input_thresh\" : \"-70.00\",\n\t\"output_i\" : \"-18.00\",\n\t\"output_tp\" : \"-1.00\",\n\t\"output_lra\" : \"0.00\",\n\t\"output_thresh\" : \"-28.00\",\n\t\"normalization_type\" : \"dynamic\",\n\t\"target_offset\" : \"0.00\"\n}}\n"
    )
}

/// Write a fake asset and return its path
pub fn write_asset(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, bytes).unwrap();
    path
}

/// Sorted (name, contents) snapshot of a directory
pub fn snapshot(dir: &Path) -> Vec<(String, Vec<u8>)> {
    let mut entries: Vec<(String, Vec<u8>)> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| {
            let entry = entry.unwrap();
            (
                entry.file_name().to_string_lossy().into_owned(),
                fs::read(entry.path()).unwrap(),
            )
        })
        .collect();
    entries.sort();
    entries
}

/// File names in a directory, sorted
pub fn file_names(dir: &Path) -> Vec<String> {
    snapshot(dir).into_iter().map(|(name, _)| name).collect()
}
