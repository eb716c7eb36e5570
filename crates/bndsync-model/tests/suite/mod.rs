mod snapshot_workspace;
