//! Named landmark indices for the MediaPipe-style face mesh (468/478 points),
//! hand (21 points), and body pose (33 points) topologies.
//!
//! The analyzers address landmarks exclusively through these constants so the
//! geometry code reads as anatomy, not magic numbers.

// ============================================================================
// FACE MESH (468 points, iris refinement adds 468-477)
// ============================================================================

pub mod face {
    /// Nose tip.
    pub const NOSE_TIP: usize = 1;
    /// Top of the forehead.
    pub const FOREHEAD: usize = 10;
    /// Bottom of the chin.
    pub const CHIN: usize = 152;

    /// Outer cheek contour points used for face width.
    pub const RIGHT_CHEEK_EDGE: usize = 234;
    pub const LEFT_CHEEK_EDGE: usize = 454;

    /// Mid-cheek points used for cheek-raise measurement.
    pub const RIGHT_CHEEK: usize = 205;
    pub const LEFT_CHEEK: usize = 425;

    /// Nostril outer edges.
    pub const RIGHT_NOSTRIL: usize = 98;
    pub const LEFT_NOSTRIL: usize = 327;

    // Right eye (subject's right, image left side)
    pub const RIGHT_EYE_OUTER: usize = 33;
    pub const RIGHT_EYE_INNER: usize = 133;
    pub const RIGHT_EYE_TOP: usize = 159;
    pub const RIGHT_EYE_BOTTOM: usize = 145;

    // Left eye
    pub const LEFT_EYE_INNER: usize = 362;
    pub const LEFT_EYE_OUTER: usize = 263;
    pub const LEFT_EYE_TOP: usize = 386;
    pub const LEFT_EYE_BOTTOM: usize = 374;

    /// Iris centers (only present in the refined 478-point set).
    pub const RIGHT_IRIS_CENTER: usize = 468;
    pub const LEFT_IRIS_CENTER: usize = 473;

    // Brows
    pub const RIGHT_BROW_OUTER: usize = 105;
    pub const LEFT_BROW_OUTER: usize = 334;
    pub const RIGHT_BROW_INNER: usize = 55;
    pub const LEFT_BROW_INNER: usize = 285;

    // Mouth
    pub const MOUTH_RIGHT_CORNER: usize = 61;
    pub const MOUTH_LEFT_CORNER: usize = 291;
    pub const UPPER_LIP: usize = 13;
    pub const LOWER_LIP: usize = 14;
}

// ============================================================================
// HAND (21 points)
// ============================================================================

pub mod hand {
    pub const WRIST: usize = 0;

    pub const THUMB_MCP: usize = 2;
    pub const THUMB_TIP: usize = 4;

    pub const INDEX_PIP: usize = 6;
    pub const INDEX_TIP: usize = 8;

    pub const MIDDLE_PIP: usize = 10;
    pub const MIDDLE_TIP: usize = 12;

    pub const RING_PIP: usize = 14;
    pub const RING_TIP: usize = 16;

    pub const PINKY_PIP: usize = 18;
    pub const PINKY_TIP: usize = 20;

    /// (tip, proximal joint) pairs for the four non-thumb fingers, in
    /// index → pinky order.
    pub const FINGERS: [(usize, usize); 4] = [
        (INDEX_TIP, INDEX_PIP),
        (MIDDLE_TIP, MIDDLE_PIP),
        (RING_TIP, RING_PIP),
        (PINKY_TIP, PINKY_PIP),
    ];
}

// ============================================================================
// BODY POSE (33 points)
// ============================================================================

pub mod pose {
    pub const NOSE: usize = 0;
    pub const LEFT_EAR: usize = 7;
    pub const RIGHT_EAR: usize = 8;
    pub const LEFT_SHOULDER: usize = 11;
    pub const RIGHT_SHOULDER: usize = 12;
    pub const LEFT_ELBOW: usize = 13;
    pub const RIGHT_ELBOW: usize = 14;
    pub const LEFT_WRIST: usize = 15;
    pub const RIGHT_WRIST: usize = 16;
    pub const LEFT_HIP: usize = 23;
    pub const RIGHT_HIP: usize = 24;
    pub const LEFT_KNEE: usize = 25;
    pub const RIGHT_KNEE: usize = 26;
    pub const LEFT_ANKLE: usize = 27;
    pub const RIGHT_ANKLE: usize = 28;
}
