use serde::{Serialize, Deserialize};

use crate::modules::error::{LocationError, LocationErrorKind};

// One position reading. Only constructed through `GeoFix::new`, so a fix is
// either complete and valid or absent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoFix {
    latitude: f64,
    longitude: f64,
}

impl GeoFix {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, LocationError> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(LocationError::new(
                LocationErrorKind::PositionUnavailable,
                format!("non-finite coordinates ({}, {})", latitude, longitude),
            ));
        }
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(LocationError::new(
                LocationErrorKind::PositionUnavailable,
                format!("coordinates out of range ({}, {})", latitude, longitude),
            ));
        }
        Ok(Self { latitude, longitude })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

// The course picked from the externally populated list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseSelection(String);

impl CourseSelection {
    // Returns None for an empty value or the "nothing selected" placeholder
    pub fn parse(value: &str, placeholder: &str) -> Option<Self> {
        let value = value.trim();
        if value.is_empty() || value == placeholder.trim() {
            return None;
        }
        Some(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// A JPEG still of the video surface, as a data URI
#[derive(Debug, PartialEq, Eq)]
pub struct CaptureFrame(String);

impl CaptureFrame {
    pub fn from_data_uri(data_uri: String) -> Self {
        Self(data_uri)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

// Body of the attendance POST. Field names are fixed by the server
#[derive(Debug, Serialize)]
pub struct SubmissionRequest {
    pub image_data: String,
    pub location: GeoFix,
    pub matakuliah_id: String,
}

impl SubmissionRequest {
    // Takes every constituent by value so a frame or fix cannot outlive its attempt
    pub fn assemble(frame: CaptureFrame, fix: GeoFix, course: CourseSelection) -> Self {
        Self {
            image_data: frame.into_inner(),
            location: fix,
            matakuliah_id: course.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geo_fix_accepts_valid_coordinates() {
        let fix = GeoFix::new(-6.2, 106.8).unwrap();
        assert_eq!(fix.latitude(), -6.2);
        assert_eq!(fix.longitude(), 106.8);
    }

    #[test]
    fn test_geo_fix_rejects_nan_and_out_of_range() {
        assert!(GeoFix::new(f64::NAN, 0.0).is_err());
        assert!(GeoFix::new(0.0, f64::INFINITY).is_err());
        assert!(GeoFix::new(91.0, 0.0).is_err());
        assert!(GeoFix::new(0.0, -180.5).is_err());
    }

    #[test]
    fn test_course_selection_rejects_empty_and_placeholder() {
        assert!(CourseSelection::parse("", "").is_none());
        assert!(CourseSelection::parse("   ", "").is_none());
        assert!(CourseSelection::parse("0", "0").is_none());
        assert_eq!(CourseSelection::parse(" CS101 ", "0").unwrap().as_str(), "CS101");
    }

    #[test]
    fn test_request_serializes_wire_fields() {
        let request = SubmissionRequest::assemble(
            CaptureFrame::from_data_uri("data:image/jpeg;base64,AAAA".to_string()),
            GeoFix::new(-6.2, 106.8).unwrap(),
            CourseSelection::parse("CS101", "").unwrap(),
        );

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "image_data": "data:image/jpeg;base64,AAAA",
                "location": { "latitude": -6.2, "longitude": 106.8 },
                "matakuliah_id": "CS101"
            })
        );
    }
}
