use clap::{Parser, Subcommand};
use roomcapture_core::{DrawingId, ProjectId, RoomId};
use std::path::PathBuf;

/// Field capture of rooms pinned on construction drawings
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file (JSON)
    #[arg(long, env = "ROOMCAPTURE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Storage root, overriding the config file
    #[arg(long, env = "ROOMCAPTURE_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Owner token scoping which projects are visible
    #[arg(long, env = "ROOMCAPTURE_OWNER", default_value = "local")]
    pub owner: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List projects, newest first
    Projects,

    /// Create a new project
    CreateProject {
        name: String,

        /// Foreman responsible for the site
        #[arg(short, long, default_value = "")]
        foreman: String,
    },

    /// Delete a project with all its drawings, rooms, and scans
    DeleteProject { project: ProjectId },

    /// Import a drawing document into a project
    ImportDrawing {
        project: ProjectId,

        /// Document file to import
        file: PathBuf,

        /// Display name (defaults to the file name)
        #[arg(short, long)]
        name: Option<String>,
    },

    /// List drawings of a project
    Drawings { project: ProjectId },

    /// Make a drawing the active one for its project
    SetActive { project: ProjectId, drawing: DrawingId },

    /// Delete a drawing with its rooms and scans
    DeleteDrawing { drawing: DrawingId },

    /// Pin a new room on a drawing
    AddRoom {
        project: ProjectId,

        /// Drawing to pin on (defaults to the active drawing)
        #[arg(short, long)]
        drawing: Option<DrawingId>,

        name: String,

        /// Horizontal pin position
        x: f64,

        /// Vertical pin position
        y: f64,

        /// Page width in points; when set, x and y are page points
        #[arg(long, requires = "page_height")]
        page_width: Option<f64>,

        /// Page height in points
        #[arg(long, requires = "page_width")]
        page_height: Option<f64>,

        /// Images of a scan to record right away
        #[arg(long, num_args = 1..)]
        scan: Vec<String>,
    },

    /// List rooms of a drawing
    Rooms { drawing: DrawingId },

    /// Delete a room and its scans
    DeleteRoom { room: RoomId },

    /// Record a scan for a room
    AddScan {
        project: ProjectId,
        room: RoomId,

        /// Captured image file names
        images: Vec<String>,

        /// Mark whether every wall was covered
        #[arg(long)]
        coverage_complete: Option<bool>,
    },

    /// Per-room summary of a project
    Report { project: ProjectId },
}
