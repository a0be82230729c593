/// Data layer: external SDDS tools, type filtering and plot data.
///
/// Architecture:
/// ```text
///  <root>.twi / .s / .cen / .mag          particle file
///        │                                     │
///        ▼                                     ▼
///   ┌──────────┐                         ┌──────────┐
///   │ extract  │  sdds2stream → columns  │  report  │  sddsanalyzebeam
///   └──────────┘                         └──────────┘  + sddsprintout ×3
///        │                                     │
///        ▼                                     ▼
///   ┌──────────┐                          BeamReport
///   │  filter  │  ElementType allow-lists → filtered Profile
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ beamline │  unit conversion → OpticsData / BeamSizeData / EmittanceData
///   └──────────┘
/// ```

pub mod beamline;
pub mod extract;
pub mod filter;
pub mod model;
pub mod report;
