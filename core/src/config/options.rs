use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;

/// FFT window applied by the sound segment extractor.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WindowFunction {
    Hanning,
    Hamming,
}

impl WindowFunction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hanning => "hanning",
            Self::Hamming => "hamming",
        }
    }
}

/// Caller-supplied, partially specified options for a pipeline run.
///
/// Every field is optional. The resolver never mutates this value; it reads
/// it and produces a [`ResolvedConfig`](super::ResolvedConfig) instead.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineOptions {
    #[serde(deserialize_with = "joined_or_list")]
    pub rawdata: Vec<PathBuf>,
    pub rawdata_type: Option<String>,

    pub data_index: Option<u32>,
    pub sampling_rate: Option<u32>,
    pub window_length: Option<u32>,
    pub window_function: Option<WindowFunction>,
    pub high_pass_filter: Option<f64>,
    pub low_pass_filter: Option<f64>,
    pub n_moving_average: Option<u32>,
    pub segment_overlap_ratio: Option<u32>,
    pub multi_filter_option: Option<String>,

    pub type_weight: Option<PathBuf>,
    pub window_size: Option<u32>,
    pub reduce_factor: Option<u32>,

    pub working_dir: Option<PathBuf>,
    pub base_segment: Option<PathBuf>,
    pub base_xy: Option<PathBuf>,
    pub status_mi: Option<PathBuf>,
    pub add_segment: Option<PathBuf>,
    pub add_xy: Option<PathBuf>,
    pub add_status_mi: Option<PathBuf>,
    pub status_ms: Option<PathBuf>,

    pub map_inspector: Option<bool>,
    pub map_inspector_sharable: Option<bool>,
    pub monitoring_scope: Option<bool>,
    pub monitoring_scope_sharable: Option<bool>,
}

impl PipelineOptions {
    pub fn with_rawdata<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            rawdata: paths.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// True when any option that only makes sense for sound data is present.
    pub(crate) fn has_sound_hint(&self) -> bool {
        self.data_index.is_some() || self.sampling_rate.is_some() || self.window_length.is_some()
    }

    /// Overlays every option set in `other` on top of `self`.
    pub fn merge(&mut self, other: PipelineOptions) {
        if !other.rawdata.is_empty() {
            self.rawdata = other.rawdata;
        }
        macro_rules! overlay {
            ($($field:ident),+ $(,)?) => {
                $(if other.$field.is_some() {
                    self.$field = other.$field;
                })+
            };
        }
        overlay!(
            rawdata_type,
            data_index,
            sampling_rate,
            window_length,
            window_function,
            high_pass_filter,
            low_pass_filter,
            n_moving_average,
            segment_overlap_ratio,
            multi_filter_option,
            type_weight,
            window_size,
            reduce_factor,
            working_dir,
            base_segment,
            base_xy,
            status_mi,
            add_segment,
            add_xy,
            add_status_mi,
            status_ms,
            map_inspector,
            map_inspector_sharable,
            monitoring_scope,
            monitoring_scope_sharable,
        );
    }

    /// Reference text for every option the pipeline understands.
    pub fn describe() -> &'static str {
        PARAMETER_REFERENCE
    }
}

/// Accepts `rawdata` either as a list or as one space-delimited string.
fn joined_or_list<'de, D>(deserializer: D) -> Result<Vec<PathBuf>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawData {
        Joined(String),
        List(Vec<PathBuf>),
    }

    Ok(match RawData::deserialize(deserializer)? {
        RawData::Joined(joined) => joined.split_whitespace().map(PathBuf::from).collect(),
        RawData::List(list) => list,
    })
}

const PARAMETER_REFERENCE: &str = "\
operations:
  type-weight    create type_weight.csv for table data
  basemap        create a base map
  open-basemap   reopen an existing base map
  addplot        project new data onto an existing base map
  filter         apply the multi-band filter to a segment file in place

options:
  # required
  rawdata: []                    # data files to analyze (.csv, .wav, optionally .gz)

  # sound data
  data_index: 1                  # column to read for sound data in CSV format
  sampling_rate: 48000           # sampling rate (Hz)
  window_length: 65536           # FFT window length
  window_function: hanning       # hanning | hamming

  # table data
  reduce_factor: 1               # keep 1/rf of the input records
  window_size: 1                 # moving average window size

  # optional sound data filters
  high_pass_filter: ~            # high pass filter (Hz)
  low_pass_filter: ~             # low pass filter (Hz)
  multi_filter_option: ~         # band-pass filter string, e.g. \":300,4000:5000,6000:8000,20000:\"
  n_moving_average: ~            # spectrum smoothing window; 1 disables smoothing
  segment_overlap_ratio: ~       # overlap (%) between successive segments

  # set automatically, may be overridden
  rawdata_type: ~                # table | sound
  working_dir: analysis          # directory holding analysis results
  type_weight: analysis/type_weight.csv
  map_inspector: true            # launch the map inspector after a run
  map_inspector_sharable: false
  monitoring_scope: false        # launch the monitoring scope after an addplot
  monitoring_scope_sharable: false
  base_segment: analysis/segments.csv
  base_xy: analysis/xy.dat
  status_mi: analysis/status.mi
  add_segment: analysis/segments-add.csv
  add_xy: analysis/xy-add.dat
  add_status_mi: analysis/status-add.mi
  status_ms: analysis/status.ms
";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_keeps_unset_fields() {
        let mut base = PipelineOptions::with_rawdata(["a.csv"]);
        base.type_weight = Some("tw.csv".into());
        base.window_size = Some(4);

        let overrides = PipelineOptions {
            window_size: Some(8),
            map_inspector: Some(false),
            ..Default::default()
        };
        base.merge(overrides);

        assert_eq!(base.rawdata, vec![PathBuf::from("a.csv")]);
        assert_eq!(base.type_weight, Some(PathBuf::from("tw.csv")));
        assert_eq!(base.window_size, Some(8));
        assert_eq!(base.map_inspector, Some(false));
    }

    #[test]
    fn sound_hints_cover_three_options() {
        let mut options = PipelineOptions::with_rawdata(["a.csv"]);
        assert!(!options.has_sound_hint());
        options.window_length = Some(1024);
        assert!(options.has_sound_hint());
    }

    #[test]
    fn describe_lists_every_output_path() {
        let text = PipelineOptions::describe();
        for key in ["base_segment", "add_xy", "status_ms", "type_weight"] {
            assert!(text.contains(key), "missing {key}");
        }
    }

    #[test]
    fn rawdata_accepts_joined_string_or_list() {
        let joined: PipelineOptions =
            serde_yaml::from_str("rawdata: a.wav b.wav\nwindow_function: hamming\n").unwrap();
        let listed: PipelineOptions =
            serde_yaml::from_str("rawdata:\n  - a.wav\n  - b.wav\n").unwrap();
        assert_eq!(joined.rawdata, listed.rawdata);
        assert_eq!(joined.window_function, Some(WindowFunction::Hamming));
    }

    #[test]
    fn unknown_option_is_rejected() {
        assert!(serde_yaml::from_str::<PipelineOptions>("window_lenght: 4096\n").is_err());
    }
}
