pub mod recording_overlay_surface;
