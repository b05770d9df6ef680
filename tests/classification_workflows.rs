//
// classification_workflows.rs
// Modality-Classifier-rs
//
// Integration-style tests covering DICOM decoding, intensity normalization, JPEG conversion, and the full classification pipeline.
//
// Thales Matheus Mendonça Santos - December 2025

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use dicom::core::{DataElement, PrimitiveValue, Tag, VR};
use dicom::dictionary_std::StandardDataDictionary;
use dicom::object::{FileDicomObject, FileMetaTableBuilder, InMemDicomObject};
use dicom::transfer_syntax::entries::EXPLICIT_VR_LITTLE_ENDIAN;
use modality_classifier::classify::ModalityScorer;
use modality_classifier::error::PipelineError;
use modality_classifier::models::Modality;
use modality_classifier::{decode, normalize, pipeline, raster};
use ndarray::Array4;
use tempfile::{tempdir, TempDir};

/// Scorer standing in for the ONNX artifact: checks the tensor contract and
/// returns a fixed score, counting how often it was invoked.
struct StubScorer {
    score: f32,
    calls: AtomicUsize,
}

impl StubScorer {
    fn returning(score: f32) -> Self {
        Self {
            score,
            calls: AtomicUsize::new(0),
        }
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ModalityScorer for StubScorer {
    fn score(&self, input: &Array4<f32>) -> Result<f32, PipelineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert_eq!(input.dim(), (1, 152, 152, 3), "model input shape");
        assert!(
            input.iter().all(|v| (0.0..=1.0).contains(v)),
            "model input values must lie in [0, 1]"
        );
        Ok(self.score)
    }
}

fn build_test_dicom(rows: u16, cols: u16, pixels: Vec<u16>) -> (TempDir, PathBuf) {
    // Construct a tiny 16-bit Secondary Capture instance with predictable pixel values.
    assert_eq!(pixels.len(), rows as usize * cols as usize);
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("sample.dcm");

    let mut obj = InMemDicomObject::new_empty_with_dict(StandardDataDictionary);
    obj.put(DataElement::new(
        Tag(0x0008, 0x0016),
        VR::UI,
        PrimitiveValue::from("1.2.840.10008.5.1.4.1.1.7"),
    ));
    obj.put(DataElement::new(
        Tag(0x0008, 0x0018),
        VR::UI,
        PrimitiveValue::from("1.2.826.0.1.3680043.2.1125.1"),
    ));
    obj.put(DataElement::new(
        Tag(0x0008, 0x0060),
        VR::CS,
        PrimitiveValue::from("OT"),
    ));

    obj.put(DataElement::new(
        Tag(0x0028, 0x0010),
        VR::US,
        PrimitiveValue::from(rows),
    )); // Rows
    obj.put(DataElement::new(
        Tag(0x0028, 0x0011),
        VR::US,
        PrimitiveValue::from(cols),
    )); // Columns
    obj.put(DataElement::new(
        Tag(0x0028, 0x0002),
        VR::US,
        PrimitiveValue::from(1_u16),
    )); // Samples per pixel
    obj.put(DataElement::new(
        Tag(0x0028, 0x0100),
        VR::US,
        PrimitiveValue::from(16_u16),
    )); // Bits Allocated
    obj.put(DataElement::new(
        Tag(0x0028, 0x0101),
        VR::US,
        PrimitiveValue::from(16_u16),
    )); // Bits Stored
    obj.put(DataElement::new(
        Tag(0x0028, 0x0102),
        VR::US,
        PrimitiveValue::from(15_u16),
    )); // High Bit
    obj.put(DataElement::new(
        Tag(0x0028, 0x0103),
        VR::US,
        PrimitiveValue::from(0_u16),
    )); // Pixel Representation
    obj.put(DataElement::new(
        Tag(0x0028, 0x0004),
        VR::CS,
        PrimitiveValue::from("MONOCHROME2"),
    ));
    obj.put(DataElement::new(
        Tag(0x0028, 0x0008),
        VR::IS,
        PrimitiveValue::from("1"),
    )); // Number of Frames

    obj.put(DataElement::new(
        Tag(0x7fe0, 0x0010),
        VR::OW,
        PrimitiveValue::U16(pixels.into()),
    ));

    let meta = FileMetaTableBuilder::new()
        .transfer_syntax(EXPLICIT_VR_LITTLE_ENDIAN.uid())
        .media_storage_sop_class_uid("1.2.840.10008.5.1.4.1.1.7")
        .media_storage_sop_instance_uid("1.2.826.0.1.3680043.2.1125.1")
        .build()
        .expect("meta");

    let mut file_obj = FileDicomObject::new_empty_with_dict_and_meta(StandardDataDictionary, meta);
    for elem in obj {
        file_obj.put(elem);
    }
    file_obj.write_to_file(&path).expect("write test dicom");

    (dir, path)
}

#[test]
fn decoder_preserves_native_bit_depth() {
    let (_dir, path) = build_test_dicom(2, 2, vec![0, 1024, 2048, 4095]);

    let grid = decode::read_pixel_grid(&path).expect("decode");
    assert_eq!(grid.height(), 2);
    assert_eq!(grid.width(), 2);
    assert_eq!(grid.channels(), 1);
    assert_eq!(grid.max_sample(), 4095);
}

#[test]
fn normalizer_stretches_16_bit_grids_to_full_8_bit_range() {
    let (_dir, path) = build_test_dicom(2, 2, vec![0, 1024, 2048, 4095]);

    let grid = decode::read_pixel_grid(&path).expect("decode");
    let normalized = normalize::rescale_to_8bit(&grid);

    let max = normalized.data.iter().copied().max().unwrap();
    assert!(max >= 254, "maximum should reach 255 within rounding, got {max}");
    assert_eq!(normalized.data[[0, 0]], 0);
}

#[test]
fn dicom_converts_to_jpeg_on_disk() {
    let (_dir, path) = build_test_dicom(8, 8, (0..64u16).map(|v| v * 64).collect());

    let target = pipeline::convert_dicom_to_jpeg(&path, None).expect("convert");
    assert_eq!(target.extension().and_then(|e| e.to_str()), Some("jpg"));

    let bytes = std::fs::read(&target).expect("read jpeg");
    assert!(bytes.starts_with(&[0xFF, 0xD8]), "JPEG magic expected");

    let decoded = raster::decode_raster(&bytes).expect("decode jpeg");
    assert_eq!(decoded.width(), 8);
    assert_eq!(decoded.height(), 8);
}

#[test]
fn full_pipeline_classifies_a_16_bit_dicom_upload() {
    // 512x512 single-frame grid with max value 4095, uploaded as scan.dcm.
    let pixels: Vec<u16> = (0..512u32 * 512).map(|i| (i % 4096) as u16).collect();
    let (_dir, path) = build_test_dicom(512, 512, pixels);
    let bytes = std::fs::read(&path).expect("read dicom");

    let scorer = StubScorer::returning(0.8);
    let outcome = pipeline::classify_bytes(&scorer, "scan.dcm", &bytes).expect("classify");

    assert_eq!(scorer.call_count(), 1);
    assert_eq!(outcome.modality, Modality::Mri);
}

#[test]
fn all_zero_dicom_completes_the_pipeline() {
    // The flat-image guard must keep the normalizer from dividing by zero and
    // still deliver a deterministic (if degenerate) classification.
    let (_dir, path) = build_test_dicom(16, 16, vec![0; 256]);

    let grid = decode::read_pixel_grid(&path).expect("decode");
    let normalized = normalize::rescale_to_8bit(&grid);
    assert!(normalized.data.iter().all(|&v| v == 0));

    let bytes = std::fs::read(&path).expect("read dicom");
    let scorer = StubScorer::returning(0.0);
    let outcome = pipeline::classify_bytes(&scorer, "scan.dcm", &bytes).expect("classify");
    assert_eq!(outcome.modality, Modality::Ct);
}

#[test]
fn unsupported_extension_is_rejected_before_scoring() {
    let scorer = StubScorer::returning(0.9);
    let err = pipeline::classify_bytes(&scorer, "photo.txt", b"plain text").unwrap_err();

    assert!(matches!(err, PipelineError::UnsupportedMedia(_)));
    assert_eq!(scorer.call_count(), 0, "scorer must not run for rejected uploads");
}

#[test]
fn png_uploads_take_the_direct_raster_path() {
    let mut bytes = Vec::new();
    let image = image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
        64,
        48,
        image::Rgb([120, 130, 140]),
    ));
    image
        .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
        .expect("encode png");

    let scorer = StubScorer::returning(0.2);
    let outcome = pipeline::classify_bytes(&scorer, "photo.png", &bytes).expect("classify");

    assert_eq!(scorer.call_count(), 1);
    assert_eq!(outcome.modality, Modality::Ct);
}

#[test]
fn corrupt_dicom_bytes_surface_as_decode_error() {
    let scorer = StubScorer::returning(0.5);
    let err = pipeline::classify_bytes(&scorer, "scan.dcm", b"not dicom at all").unwrap_err();

    assert!(matches!(err, PipelineError::Decode(_)));
    assert_eq!(scorer.call_count(), 0);
}

#[test]
fn classify_file_routes_converted_jpeg_through_raster_path() {
    let (_dir, path) = build_test_dicom(8, 8, (0..64u16).map(|v| v * 60).collect());
    let target = pipeline::convert_dicom_to_jpeg(&path, None).expect("convert");

    let scorer = StubScorer::returning(0.7);
    let outcome = pipeline::classify_file(&scorer, &target).expect("classify");

    assert_eq!(outcome.modality, Modality::Mri);
}
